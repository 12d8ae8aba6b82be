//! File boundary for beam comparison: CSV in, CSV out, through polars
//! `DataFrame`s.

pub mod cell;
pub mod export;
pub mod ingest;

pub use export::{
    fom_to_frame, overall_to_frame, table_to_frame, write_fom, write_frame, write_overall,
    write_table,
};
pub use ingest::{frame_to_table, read_frequency_list, read_sample_table};
