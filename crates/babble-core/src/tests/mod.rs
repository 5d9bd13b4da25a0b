mod audio;
mod recorder;
mod support;
