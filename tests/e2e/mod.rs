mod config_files;
mod decoration_sync;
mod inline_paint;
mod overview;
mod render_thread;
