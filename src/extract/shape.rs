//! Envelope shape matching
//!
//! The same logical payload arrives wrapped in different envelopes depending
//! on the entry path. Each known layout is a [`ShapeMatcher`]; extraction runs
//! an ordered list of shapes and uses the first positive match.

use serde_json::Value;

/// Recognizes one envelope layout and returns the payload node inside it
pub trait ShapeMatcher: Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns the payload node when the document has this layout
    fn locate<'a>(&self, document: &'a Value) -> Option<&'a Value>;
}

/// Layout identified by a JSON pointer and a key the payload must carry
#[derive(Debug, Clone, Copy)]
pub struct PointerShape {
    pub name: &'static str,
    pub pointer: &'static str,
    pub required_key: &'static str,
}

impl ShapeMatcher for PointerShape {
    fn name(&self) -> &'static str {
        self.name
    }

    fn locate<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        document
            .pointer(self.pointer)
            .filter(|node| node.get(self.required_key).is_some())
    }
}

/// Feed entry wrapped in a list of edges (first page of a feed)
pub const FEED_EDGE_LIST: PointerShape = PointerShape {
    name: "feed-edge-list",
    pointer: "/data/node/timeline_list_feed_units/edges/0/node",
    required_key: "comet_sections",
};

/// Feed entry delivered directly as the data node (streamed follow-up entries)
pub const FEED_DIRECT_NODE: PointerShape = PointerShape {
    name: "feed-direct-node",
    pointer: "/data/node",
    required_key: "comet_sections",
};

/// Known feed entry layouts, in match order
pub const FEED_ENTRY_SHAPES: &[PointerShape] = &[FEED_EDGE_LIST, FEED_DIRECT_NODE];

/// Root comment connection as returned by the root and pagination queries
pub const ROOT_COMMENTS: PointerShape = PointerShape {
    name: "root-comments",
    pointer: "/data/node/comment_rendering_instance_for_feed_location/comments",
    required_key: "edges",
};

/// Root comment connection without the feed-location rendering wrapper
pub const ROOT_COMMENTS_PLAIN: PointerShape = PointerShape {
    name: "root-comments-plain",
    pointer: "/data/node/comment_rendering_instance/comments",
    required_key: "edges",
};

/// Known root comment connection layouts, in match order
pub const ROOT_COMMENT_SHAPES: &[PointerShape] = &[ROOT_COMMENTS, ROOT_COMMENTS_PLAIN];

/// Reply connection of one root comment
pub const REPLIES: PointerShape = PointerShape {
    name: "replies",
    pointer: "/data/node/replies_connection",
    required_key: "edges",
};

/// Known reply connection layouts, in match order
pub const REPLY_SHAPES: &[PointerShape] = &[REPLIES];

/// Locations of the feed's `page_info` object, in match order
pub const FEED_PAGE_INFO_POINTERS: &[&str] = &[
    "/data/page_info",
    "/data/node/timeline_list_feed_units/page_info",
];

/// Tries the shapes in order and returns the first match with its name
pub fn first_match<'a, P: ShapeMatcher>(
    shapes: &[P],
    document: &'a Value,
) -> Option<(&'static str, &'a Value)> {
    shapes
        .iter()
        .find_map(|shape| shape.locate(document).map(|node| (shape.name(), node)))
}
