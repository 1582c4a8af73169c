pub mod board;
pub mod terminal_env;
pub mod viewer;
pub mod windows;
