// ---------------------------------------------------------------------------
// NDJSON transport -- newline-delimited JSON-RPC 2.0 responses on stdout
// ---------------------------------------------------------------------------

use std::io::Write;

#[derive(Debug, Default)]
pub struct NdjsonTransport;

impl NdjsonTransport {
	pub fn new() -> Self {
		Self
	}

	pub fn write_response(&self, id: u64, result: serde_json::Value) {
		self.write_line(serde_json::json!({
			"jsonrpc": "2.0",
			"id": id,
			"result": result,
		}));
	}

	pub fn write_error(
		&self,
		id: u64,
		code: i32,
		message: String,
		data: Option<serde_json::Value>,
	) {
		let mut error = serde_json::json!({
			"code": code,
			"message": message,
		});
		if let Some(data) = data {
			error["data"] = data;
		}
		self.write_line(serde_json::json!({
			"jsonrpc": "2.0",
			"id": id,
			"error": error,
		}));
	}

	fn write_line(&self, value: serde_json::Value) {
		let stdout = std::io::stdout();
		let mut handle = stdout.lock();
		// A broken pipe means the client is gone; nothing useful to do.
		let _ = writeln!(handle, "{}", value);
		let _ = handle.flush();
	}
}
