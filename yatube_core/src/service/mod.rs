pub mod follows;
pub mod groups;
pub mod posts;
pub mod users;

pub use follows::{FollowsService, FollowsServiceError};
pub use groups::{GroupsService, GroupsServiceError};
pub use posts::{PostsService, PostsServiceError};
pub use users::{UsersService, UsersServiceError};
