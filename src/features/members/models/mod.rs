mod member;

pub use member::{Member, MemberFields, NewMember, SocialMedia};
