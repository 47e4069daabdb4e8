pub mod player_launcher;
