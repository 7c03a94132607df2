pub mod batch;
pub mod config;
pub mod dispatch;
pub mod extract;
pub mod filter;
pub mod html;
pub mod ledger;
pub mod message;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod sink;
pub mod source;

#[cfg(test)]
mod tests;
