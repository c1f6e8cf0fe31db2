//! Domain models exchanged with the APSIS service.

pub mod demographics;
pub mod mailing_list;
pub mod subscription;

pub use demographics::*;
pub use mailing_list::*;
pub use subscription::*;
