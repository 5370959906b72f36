pub mod output;

pub use output::RodioOutput;
