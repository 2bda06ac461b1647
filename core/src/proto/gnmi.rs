// Subset of openconfig gnmi.proto (package gnmi) consumed by the relay.
// Deprecated fields and the request side of the service are not modelled;
// tags match the upstream definition so the wire format is compatible.

/// Notification is a re-usable message that is used to encode data from the
/// target to the client.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Notification {
    /// Timestamp in nanoseconds since Epoch.
    #[prost(int64, tag = "1")]
    pub timestamp: i64,
    /// Prefix used for paths in the message.
    #[prost(message, optional, tag = "2")]
    pub prefix: ::core::option::Option<Path>,
    #[prost(message, repeated, tag = "4")]
    pub update: ::prost::alloc::vec::Vec<Update>,
    #[prost(message, repeated, tag = "5")]
    pub delete: ::prost::alloc::vec::Vec<Path>,
    /// This notification contains a set of paths that are always updated together.
    #[prost(bool, tag = "6")]
    pub atomic: bool,
}

/// Update is a re-usable message that is used to store a particular Path,
/// Value pair.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Update {
    #[prost(message, optional, tag = "1")]
    pub path: ::core::option::Option<Path>,
    #[prost(message, optional, tag = "3")]
    pub val: ::core::option::Option<TypedValue>,
    /// Number of coalesced duplicates.
    #[prost(uint32, tag = "4")]
    pub duplicates: u32,
}

/// TypedValue is used to encode a value being sent between the client and
/// target.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypedValue {
    #[serde(flatten)]
    #[prost(
        oneof = "typed_value::Value",
        tags = "1, 2, 3, 4, 5, 6, 14, 7, 8, 9, 10, 11, 12, 13"
    )]
    pub value: ::core::option::Option<typed_value::Value>,
}

/// Nested message and enum types in `TypedValue`.
pub mod typed_value {
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(string, tag = "1")]
        StringVal(::prost::alloc::string::String),
        #[prost(int64, tag = "2")]
        IntVal(i64),
        #[prost(uint64, tag = "3")]
        UintVal(u64),
        #[prost(bool, tag = "4")]
        BoolVal(bool),
        #[prost(bytes, tag = "5")]
        BytesVal(::prost::alloc::vec::Vec<u8>),
        #[prost(float, tag = "6")]
        FloatVal(#[serde(with = "crate::proto::float_json::float")] f32),
        #[prost(double, tag = "14")]
        DoubleVal(#[serde(with = "crate::proto::float_json::double")] f64),
        #[prost(message, tag = "7")]
        DecimalVal(super::Decimal64),
        #[prost(message, tag = "8")]
        LeaflistVal(super::ScalarArray),
        #[prost(message, tag = "9")]
        AnyVal(super::super::google::protobuf::Any),
        #[prost(bytes, tag = "10")]
        JsonVal(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes, tag = "11")]
        JsonIetfVal(::prost::alloc::vec::Vec<u8>),
        #[prost(string, tag = "12")]
        AsciiVal(::prost::alloc::string::String),
        #[prost(bytes, tag = "13")]
        ProtoBytes(::prost::alloc::vec::Vec<u8>),
    }
}

/// Path encodes a data tree path as a series of repeated strings, with
/// each element of the path representing a data tree node name and the
/// associated attributes.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Path {
    /// Label to disambiguate path.
    #[prost(string, tag = "2")]
    pub origin: ::prost::alloc::string::String,
    /// Elements of the path.
    #[prost(message, repeated, tag = "3")]
    pub elem: ::prost::alloc::vec::Vec<PathElem>,
    /// The name of the target.
    #[prost(string, tag = "4")]
    pub target: ::prost::alloc::string::String,
}

/// PathElem encodes an element of a gNMI path, along with any attributes (keys)
/// that may be associated with it.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PathElem {
    /// The name of the element in the path.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// Map of key (attribute) name to value.
    #[prost(btree_map = "string, string", tag = "2")]
    pub key: ::prost::alloc::collections::BTreeMap<
        ::prost::alloc::string::String,
        ::prost::alloc::string::String,
    >,
}

/// Decimal64 is used to encode a fixed precision decimal number.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Decimal64 {
    /// Set of digits.
    #[prost(int64, tag = "1")]
    pub digits: i64,
    /// Number of digits following the decimal point.
    #[prost(uint32, tag = "2")]
    pub precision: u32,
}

/// ScalarArray is used to encode a mixed-type array of values.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScalarArray {
    /// The set of elements within the array.
    #[prost(message, repeated, tag = "1")]
    pub element: ::prost::alloc::vec::Vec<TypedValue>,
}

/// SubscribeResponse is the message used by the target within a Subscribe RPC.
/// The target includes a Notification message which is used to transmit values
/// of the path(s) that are associated with the subscription.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeResponse {
    #[serde(flatten)]
    #[prost(oneof = "subscribe_response::Response", tags = "1, 3, 4")]
    pub response: ::core::option::Option<subscribe_response::Response>,
}

/// Nested message and enum types in `SubscribeResponse`.
pub mod subscribe_response {
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Response {
        /// Changed or sampled value for a path.
        #[prost(message, tag = "1")]
        Update(super::Notification),
        /// Indicate target has sent all values associated with the subscription
        /// at least once.
        #[prost(bool, tag = "3")]
        SyncResponse(bool),
        /// Deprecated in favour of the RPC status, still emitted by older targets.
        #[prost(message, tag = "4")]
        Error(super::Error),
    }
}

/// GetResponse is used by the target to respond to a GetRequest from a client.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponse {
    /// Data values.
    #[prost(message, repeated, tag = "1")]
    pub notification: ::prost::alloc::vec::Vec<Notification>,
    #[prost(message, optional, tag = "2")]
    pub error: ::core::option::Option<Error>,
}

/// Error message previously utilised to return errors to the client.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    /// Canonical gRPC error code.
    #[prost(uint32, tag = "1")]
    pub code: u32,
    /// Human readable error.
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
    /// Optional additional information.
    #[prost(message, optional, tag = "3")]
    pub data: ::core::option::Option<super::google::protobuf::Any>,
}
