mod commands;
mod events;
mod game_loop;

pub use commands::GameCommand;
pub use events::GameEvent;
pub use game_loop::GameLoop;
