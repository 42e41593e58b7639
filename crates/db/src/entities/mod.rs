//! Database entities.

#![allow(missing_docs)]

pub mod activity;
pub mod following;
pub mod like_mark;
pub mod post;
pub mod user;

pub use activity::Entity as Activity;
pub use following::Entity as Following;
pub use like_mark::Entity as LikeMark;
pub use post::Entity as Post;
pub use user::Entity as User;
