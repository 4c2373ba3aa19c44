pub mod change_log;
pub mod checksum_refresher;
pub mod descriptor_locator;
pub mod descriptor_patcher;
pub mod report_reader;
pub mod version_control;

pub use change_log::ChangeLog;
pub use checksum_refresher::{ChecksumRefresherAgent, ChecksumTool};
pub use descriptor_locator::DescriptorLocator;
pub use descriptor_patcher::{DescriptorPatcher, PatchOutcome, PinBinding};
pub use report_reader::{ReportReaderAgent, VersionReport};
pub use version_control::{RollbackOutcome, VersionControlAgent};
