pub mod verdict_reader;
