pub mod score_table;

pub use score_table::ScoreTable;
