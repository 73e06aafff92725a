// Console front end - the event loop and the text commands that drive it

mod app; // owns library, session and snapshot store
pub mod events; // commands, loop events and the stdin reader

pub use app::App;
pub use events::{parse_command, AppEvent, Command, EventHandler, ViewTarget};
