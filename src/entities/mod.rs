pub mod actor;
pub mod casting;
pub mod comment;
pub mod like;
pub mod movie;
pub mod rating;
pub mod user;
