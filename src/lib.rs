pub mod anchors;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod env;
pub mod html;
pub mod location;
pub mod logging;
pub mod models;
pub mod page;
pub mod parser;
pub mod report;
pub mod scheduler;
pub mod settings;
pub mod slug;
pub mod spy;
pub mod toast;
pub mod toc;
pub mod ui;
