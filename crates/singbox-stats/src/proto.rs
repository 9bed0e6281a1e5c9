//! Protobuf types and gRPC stubs for `v2ray.core.app.stats.command`.
//!
//! Field tags match `command.proto` from v2fly/v2ray-core, which sing-box's
//! v2ray API also serves. The `stats_service_client` and
//! `stats_service_server` modules are generated by `build.rs`.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStatsRequest {
    /// Name of the stat counter.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// Whether or not to reset the counter after fetching its value.
    #[prost(bool, tag = "2")]
    pub reset: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Stat {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub value: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStatsResponse {
    #[prost(message, optional, tag = "1")]
    pub stat: ::core::option::Option<Stat>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryStatsRequest {
    /// Deprecated upstream in favour of `patterns`, still honoured by sing-box.
    #[prost(string, tag = "1")]
    pub pattern: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub reset: bool,
    #[prost(string, repeated, tag = "3")]
    pub patterns: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(bool, tag = "4")]
    pub regexp: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryStatsResponse {
    #[prost(message, repeated, tag = "1")]
    pub stat: ::prost::alloc::vec::Vec<Stat>,
}

include!(concat!(
    env!("OUT_DIR"),
    "/v2ray.core.app.stats.command.StatsService.rs"
));
