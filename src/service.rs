pub mod comment;
pub mod post;

pub use comment::CommentService;
pub use post::PostService;
