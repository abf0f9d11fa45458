//! HTML pages rendered with Handlebars. Every value is escaped by
//! default which matters here since LLM output is untrusted.

use std::fmt;

use handlebars::{Handlebars, TemplateError, handlebars_helper};

// Entries in the display log alternate between the user and the
// assistant, starting with the user.
handlebars_helper!(speaker: |i: u64| if i % 2 == 0 { "user" } else { "assistant" });

#[derive(Debug)]
pub enum Page {
    Home,
    Image,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const STYLE: &str = r#"
<style>
  body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
  nav a { margin-right: 1rem; }
  .entry { white-space: pre-wrap; padding: 0.5rem 0.75rem; margin: 0.5rem 0; border-radius: 0.5rem; }
  .user { background: #e8f0fe; }
  .assistant { background: #f1f3f4; }
  .error { color: #b00020; }
  form { display: flex; gap: 0.5rem; }
  input[type=text] { flex: 1; padding: 0.5rem; }
  img { max-width: 100%; margin-top: 1rem; }
</style>
"#;

const HOME_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Chat</title>
{{> style}}
</head>
<body>
<nav><a href="/">Chat</a><a href="/image">Image</a></nav>
<div id="log">
{{#each chat_responses}}
<div class="entry {{speaker @index}}">{{this}}</div>
{{/each}}
</div>
{{#if error}}<p class="error">{{error}}</p>{{/if}}
<form id="chat-form" method="post" action="/">
  <input type="text" id="user_input" name="user_input" autocomplete="off" required>
  <button type="submit">Send</button>
</form>
<script>
(function () {
  var log = document.getElementById("log");
  var form = document.getElementById("chat-form");
  var input = document.getElementById("user_input");
  var scheme = location.protocol === "https:" ? "wss://" : "ws://";
  var socket = new WebSocket(scheme + location.host + "/ws");
  var reply = null;

  function append(speaker, text) {
    var entry = document.createElement("div");
    entry.className = "entry " + speaker;
    entry.textContent = text;
    log.appendChild(entry);
    return entry;
  }

  socket.onmessage = function (event) {
    if (reply === null) {
      reply = append("assistant", "");
    }
    reply.textContent += event.data;
  };

  socket.onclose = function (event) {
    if (event.code === 1011) {
      append("error", event.reason || "The chat connection failed.");
    }
    socket = null;
  };

  // Without a live socket the form posts normally
  form.addEventListener("submit", function (event) {
    if (socket === null || socket.readyState !== WebSocket.OPEN) {
      return;
    }
    event.preventDefault();
    append("user", input.value);
    reply = null;
    socket.send(input.value);
    input.value = "";
  });
})();
</script>
</body>
</html>
"#;

const IMAGE_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Image</title>
{{> style}}
</head>
<body>
<nav><a href="/">Chat</a><a href="/image">Image</a></nav>
<form method="post" action="/image">
  <input type="text" name="user_input" autocomplete="off" placeholder="Describe an image" {{#if prompt}}value="{{prompt}}"{{/if}} required>
  <button type="submit">Generate</button>
</form>
{{#if error}}<p class="error">{{error}}</p>{{/if}}
{{#if image_url}}<img src="{{image_url}}" alt="{{prompt}}">{{/if}}
</body>
</html>
"#;

pub fn templates() -> Result<Handlebars<'static>, TemplateError> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_helper("speaker", Box::new(speaker));
    registry.register_partial("style", STYLE)?;
    registry.register_template_string(&Page::Home.to_string(), HOME_PAGE)?;
    registry.register_template_string(&Page::Image.to_string(), IMAGE_PAGE)?;
    Ok(registry)
}
