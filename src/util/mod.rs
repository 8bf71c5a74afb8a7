//! Utility modules

pub mod names;
pub mod paths;

pub use names::{default_username, format_username, private_channel_name};
pub use paths::{
    config_path, data_dir, games_dir, init_data_dir, log_file_path, logs_dir, public_topic_path,
    script_path, topic_path, topics_dir,
};
