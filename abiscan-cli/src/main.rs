use abiscan_core::{Binary, Header};
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

/// Native library CPU/ABI classifier
#[derive(Parser)]
#[command(
    name = "abiscan",
    about = "Identify the CPU architecture and ABI of ELF objects from their headers",
    version,
    author
)]
struct Cli {
    /// Path to binary file
    #[arg(required = true)]
    path: std::path::PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show CPU name, CPU type and ABI
    Classify {
        #[arg(long)]
        json: bool,
    },
    /// Show the decoded ELF header
    Header {
        #[arg(long)]
        json: bool,
    },
    /// List all sections
    Sections {
        #[arg(long)]
        json: bool,
    },
    /// Show decoded ARM build attributes
    Attributes,
}

#[derive(Serialize)]
struct ClassificationReport<'a> {
    path: &'a str,
    cpu_name: &'a str,
    cpu_type: String,
    cpu_family: String,
    abi_type: String,
    flags: u32,
    section_count: usize,
}

#[derive(Serialize)]
struct HeaderReport {
    class: String,
    endianness: String,
    header_version: u8,
    os_abi: u8,
    abi_version: u8,
    object_type: u16,
    machine: u16,
    version: u32,
    entry: u64,
    phoff: u64,
    shoff: u64,
    flags: u32,
    ehsize: u16,
    phentsize: u16,
    phnum: u16,
    shentsize: u16,
    shnum: u16,
    shstrndx: u16,
}

#[derive(Serialize, Tabled)]
struct SectionRow {
    #[tabled(rename = "Idx")]
    index: usize,
    #[tabled(rename = "Section")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "VMA")]
    vma: String,
    #[tabled(rename = "Offset")]
    file_offset: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Link")]
    link: u32,
    #[tabled(rename = "Info")]
    info: u32,
    #[tabled(rename = "Align")]
    addralign: u64,
    #[tabled(rename = "EntSize")]
    entsize: u64,
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn hex(v: u64) -> String {
    format!("0x{v:x}")
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    log::debug!("Opening {}", cli.path.display());
    let bin = Binary::open(&cli.path)?;
    let path = cli.path.display().to_string();
    log::debug!("{path}: {}", bin.classification);

    match cli.command {
        Command::Classify { json } => {
            let c = &bin.classification;
            let report = ClassificationReport {
                path: &path,
                cpu_name: &c.cpu_name,
                cpu_type: format!("{:?}", c.cpu_type),
                cpu_family: c.family().to_string(),
                abi_type: c.abi_type.to_string(),
                flags: c.flags,
                section_count: c.sections.len(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", path.bold());
                println!("  CPU name:  {}", report.cpu_name.green());
                println!("  CPU type:  {} ({})", report.cpu_type, report.cpu_family);
                println!("  ABI:       {}", report.abi_type.green());
                println!("  Flags:     0x{:x}", report.flags);
                if bin.header.machine() == abiscan_core::consts::EM_ARM {
                    println!(
                        "  ARM EABI:  v{} (legacy gcc 0x{:x}, float {:?})",
                        bin.header.arm_eabi_version(),
                        bin.header.arm_legacy_gcc_flags(),
                        bin.header.arm_float_mode()
                    );
                }
            }
        }

        Command::Header { json } => {
            let p = bin.primary();
            let h = &bin.header;
            let report = HeaderReport {
                class: p.class.to_string(),
                endianness: p.endianness.to_string(),
                header_version: p.header_version,
                os_abi: p.os_abi,
                abi_version: p.abi_version,
                object_type: p.object_type,
                machine: p.machine,
                version: h.e_version,
                entry: h.entry_point(),
                phoff: h.e_phoff,
                shoff: h.e_shoff,
                flags: h.e_flags,
                ehsize: h.e_ehsize,
                phentsize: h.e_phentsize,
                phnum: h.e_phnum,
                shentsize: h.e_shentsize,
                shnum: h.e_shnum,
                shstrndx: h.e_shstrndx,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} header of {}", h.format_name().bold(), path);
                println!("  {p}");
                println!("  {h}");
                println!(
                    "  Executable: {}, shared object: {}",
                    h.is_executable(),
                    h.is_shared_object()
                );
            }
        }

        Command::Sections { json } => {
            let rows: Vec<SectionRow> = bin
                .sections()
                .iter()
                .map(|s| SectionRow {
                    index: s.index,
                    name: s.name().unwrap_or("").to_string(),
                    kind: s.type_name().to_string(),
                    vma: hex(s.vma),
                    file_offset: hex(s.file_offset),
                    size: hex(s.size),
                    flags: hex(s.flags),
                    link: s.link,
                    info: s.info,
                    addralign: s.addralign,
                    entsize: s.entsize,
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No sections found (section header table absent).");
            } else {
                let table = Table::new(rows).with(Style::modern()).to_string();
                println!("{table}");
            }
        }

        Command::Attributes => match &bin.arm_attributes {
            None => println!("No ARM attributes (not an ARM 32-bit object, or section absent)."),
            Some(attrs) => {
                for vendor in &attrs.vendors {
                    println!("{} {}", "Vendor".bold(), vendor.vendor.cyan());
                    for group in &vendor.groups {
                        println!("  Scope: {:?}", group.scope);
                        let rows = group.attributes.iter().map(|a| AttributeRow {
                            tag: a.tag.to_string(),
                            value: a.value.to_string(),
                        });
                        let table = Table::new(rows).with(Style::modern()).to_string();
                        println!("{table}");
                    }
                }
            }
        },
    }

    Ok(())
}
