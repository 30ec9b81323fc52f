pub mod pane_chrome;
pub mod scrollable_list;
