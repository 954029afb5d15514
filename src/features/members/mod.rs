//! Membership intake feature.
//!
//! Accepts the public membership form, pushes its optional CV/portfolio
//! document and profile photo to the media host concurrently, and stores
//! one member record per successful submission.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/members` | No | Submit a membership form (multipart) |
//! | GET | `/api/users` | No | List every submitted member |

pub mod dtos;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{MemberService, PgMemberStore};
