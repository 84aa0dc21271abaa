pub mod ffmpeg_reader;
pub mod ffmpeg_transcoder;
pub mod ffmpeg_writer;
pub mod image_file_reader;
pub mod image_file_writer;

#[cfg(test)]
pub(crate) mod test_video;
