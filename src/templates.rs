use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub(crate) struct Index<'a> {
    version: &'a str,
    host: &'a str,
    example: &'a str,
}

impl<'a> Index<'a> {
    pub fn new(host: &'a str, example: &'a str) -> Self {
        Index {
            version: env!("CARGO_PKG_VERSION"),
            host,
            example,
        }
    }
}
