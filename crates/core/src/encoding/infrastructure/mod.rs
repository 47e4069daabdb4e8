pub mod encoder_locator;
pub mod encoder_process;
pub mod ffmpeg_encoder;
