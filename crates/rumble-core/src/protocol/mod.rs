//! Protocol module containing the rumble command grammar.

pub mod command;

pub use command::{
    parse_command, parse_command_with, CommandField, ParseError, RumbleCommand, TrailingInput,
};
