mod service;

pub use service::MembershipService;
