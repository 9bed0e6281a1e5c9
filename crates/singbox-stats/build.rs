//! Generates the `StatsService` client and server stubs.
//!
//! Messages are declared with prost derives in `src/proto.rs`; only the
//! service plumbing is generated here, so no `protoc` is needed.

use tonic_build::manual::{Builder, Method, Service};

fn main() {
    let codec = "tonic::codec::ProstCodec";
    let stats_service = Service::builder()
        .name("StatsService")
        .package("v2ray.core.app.stats.command")
        .method(
            Method::builder()
                .name("get_stats")
                .route_name("GetStats")
                .input_type("crate::proto::GetStatsRequest")
                .output_type("crate::proto::GetStatsResponse")
                .codec_path(codec)
                .build(),
        )
        .method(
            Method::builder()
                .name("query_stats")
                .route_name("QueryStats")
                .input_type("crate::proto::QueryStatsRequest")
                .output_type("crate::proto::QueryStatsResponse")
                .codec_path(codec)
                .build(),
        )
        .build();

    Builder::new().compile(&[stats_service]);
    println!("cargo:rerun-if-changed=build.rs");
}
