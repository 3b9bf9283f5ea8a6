// Local HTTP front for the content provider.

pub mod handler;
