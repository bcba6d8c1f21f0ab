pub mod aggregate;
pub mod app;
pub mod cli;
pub mod editor;
pub mod llm;
pub mod report;
pub mod schema;
pub mod session;
pub mod sheet;
pub mod store;
pub mod suggestion;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
