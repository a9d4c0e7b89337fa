pub mod attributes;
pub mod binary;
pub mod consts;
pub mod cursor;
pub mod error;
pub mod header;
pub mod platform;
pub mod resolve;
pub mod sections;

pub use attributes::{ArmAttributes, Attribute, AttributeValue, Tag};
pub use binary::*;
pub use cursor::{ByteCursor, Endianness};
pub use error::{Error, ErrorKind, Result};
pub use header::{Header, ObjectClass, PrimaryHeader, SecondaryHeader};
pub use platform::{AbiType, CpuFamily, CpuType};
pub use sections::*;
