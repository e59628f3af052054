//! Protobuf messages and the tonic server for `vidspace.v1.VideoAccess`,
//! generated from `proto/vidspace.proto` by `build.rs`.

tonic::include_proto!("vidspace.v1");
