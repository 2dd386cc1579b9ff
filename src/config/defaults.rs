pub(crate) fn default_font_size() -> u32 {
    20
}

pub(crate) fn default_line_spacing() -> f32 {
    1.3
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_book_source() -> String {
    "https://www.gutenberg.org/ebooks/1342.epub3.images".to_string()
}
