//! Fetching remote scripts.

/// True for `http://` and `https://` references; everything else is a local path.
pub fn is_remote(reference: &str) -> bool {
	reference.starts_with("http://") || reference.starts_with("https://")
}

/// What a remote server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
	pub status: u16,
	pub body: String,
}

/// Something that can GET a url. Anything but status 200 counts as failure.
pub trait Fetch {
	/// Returns the response, or a description of why there wasn't one.
	fn get(&self, url: &str) -> Result<FetchResponse, String>;
}

/// Blocking HTTP client on top of reqwest, with its default timeout.
#[derive(Debug, Default)]
pub struct HttpFetcher {
	client: reqwest::blocking::Client,
}

impl HttpFetcher {
	pub fn new() -> HttpFetcher {
		HttpFetcher::default()
	}
}

impl Fetch for HttpFetcher {
	fn get(&self, url: &str) -> Result<FetchResponse, String> {
		let response = self.client.get(url).send().map_err(|e| e.to_string())?;
		let status = response.status().as_u16();
		let body = response.text().map_err(|e| e.to_string())?;
		Ok(FetchResponse { status, body })
	}
}
