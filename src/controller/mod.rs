//! # Controllers and Endpoints
//!
//! A controller is a type whose instance the server dispatches to. Its options and
//! endpoints are declared in the [`MetadataRegistry`](crate::metadata::MetadataRegistry);
//! the instance itself only has to say which members exist and how to invoke them
//! ([`Controller`]).
//!
//! Resolution turns declarations into [`EndpointDescriptor`]s:
//!
//! - one descriptor per `(member, verb)` declaration
//! - the endpoint route is the explicit route, else the member name, else empty
//!   for the `default` member
//! - an unannotated `default` member becomes an implicit `GET`
//! - members without declarations are never routable

mod core;
mod options;

pub use core::{
    describe_controller, resolve_endpoints, Controller, ControllerDescriptor, EndpointDescriptor,
    EndpointResult, DEFAULT_MEMBER,
};
pub use options::{
    media_type_of, AuthFn, ContentType, ControllerOptions, CorsOverride, EndpointOptions,
    ErrorHandlerFn, HttpVerb,
};
