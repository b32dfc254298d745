pub mod article;
pub mod view;

pub use article::{Article, TIMESTAMP_FORMAT};
pub use view::ArticleView;
