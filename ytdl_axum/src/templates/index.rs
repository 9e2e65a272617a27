use askama::Template;

pub struct Endpoint {
    pub title: &'static str,
    pub usages: Vec<String>,
    pub description: &'static str,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub base_url: String,
    pub endpoints: Vec<Endpoint>,
    pub example_response: String,
}
