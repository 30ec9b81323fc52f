pub mod buttons;
pub mod dir_list;
pub mod file_list;
pub mod header;
