pub mod connections;
pub mod game_server;
pub mod ws_server;
