pub(crate) mod contents {
    const INDEX_HTML: &str = include_str!("index.html");

    /// Renders the page with the server's session token baked in.
    pub(crate) fn index_html(session_token: &str) -> String {
        INDEX_HTML.replace("__SESSION_TOKEN__", session_token)
    }
}
