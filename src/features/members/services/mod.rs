mod member_service;
mod member_store;

pub use member_service::MemberService;
pub use member_store::{MemberStore, PgMemberStore};
