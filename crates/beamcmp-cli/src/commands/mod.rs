pub mod compare;
pub mod derive;
pub mod util;
