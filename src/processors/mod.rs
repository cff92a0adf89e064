pub mod integrity_checker;

pub use integrity_checker::{Gap, IntegrityChecker, IntegrityReport, Violation, ViolationType};
