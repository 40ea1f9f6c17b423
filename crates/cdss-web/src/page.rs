//! The embedded single-page form.

pub const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Psychiatric Decision Support</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
  #banner { display: none; background: #fdecea; border: 1px solid #f5c2c0; padding: .75rem; margin-bottom: 1rem; }
  #error { color: #b00020; min-height: 1.2em; }
  fieldset { border: 1px solid #ccc; margin-bottom: 1rem; }
  textarea { width: 100%; min-height: 3rem; }
  .section h3 { margin-bottom: .25rem; }
  .section p { white-space: pre-wrap; margin-top: 0; }
  .missing { color: #777; font-style: italic; }
  #log div { padding: .25rem 0; white-space: pre-wrap; }
  #log .doctor { font-weight: 600; }
</style>
</head>
<body>
<div id="banner"></div>
<h1>Psychiatric Decision Support</h1>

<form id="form">
  <fieldset>
    <legend>Presentation</legend>
    <label>Symptom category <select id="category"></select></label>
    <div id="symptoms"></div>
    <label>Severity <select id="severity"></select></label>
  </fieldset>
  <fieldset>
    <legend>Background</legend>
    <label>Medical history<textarea id="history"></textarea></label>
    <label>Current medications<textarea id="medications"></textarea></label>
  </fieldset>
  <button type="submit" id="generate">Generate Recommendations</button>
</form>

<p id="error"></p>
<div id="sections"></div>

<h2>Follow-up</h2>
<form id="ask">
  <input id="question" size="60" placeholder="Ask a follow-up question">
  <button type="submit">Ask</button>
</form>

<h2>Conversation</h2>
<div id="log"></div>

<script>
let catalog = null;
let sessionId = null;

const $ = (id) => document.getElementById(id);

async function call(method, path, body) {
  const resp = await fetch(path, {
    method,
    headers: body ? { "Content-Type": "application/json" } : {},
    body: body ? JSON.stringify(body) : undefined,
  });
  const data = await resp.json().catch(() => ({}));
  if (!resp.ok) throw new Error(data.error || `HTTP ${resp.status}`);
  return data;
}

function renderSymptoms() {
  const box = $("symptoms");
  box.replaceChildren();
  const cat = catalog.categories.find((c) => c.name === $("category").value);
  for (const s of cat.symptoms) {
    const label = document.createElement("label");
    const cb = document.createElement("input");
    cb.type = "checkbox";
    cb.value = s;
    label.append(cb, " ", s);
    box.append(label, document.createElement("br"));
  }
}

function renderSections(sections) {
  const box = $("sections");
  box.replaceChildren();
  for (const s of sections) {
    const div = document.createElement("div");
    div.className = "section";
    const h = document.createElement("h3");
    h.textContent = s.label;
    const p = document.createElement("p");
    if (s.extraction.status === "found") {
      p.textContent = s.extraction.text;
    } else {
      p.textContent = "No information available.";
      p.className = "missing";
    }
    div.append(h, p);
    box.append(div);
  }
}

async function refreshLog() {
  const entries = await call("GET", `/api/sessions/${sessionId}/history`);
  const box = $("log");
  box.replaceChildren();
  for (const e of entries) {
    const div = document.createElement("div");
    div.className = e.role;
    div.textContent = `${e.role === "doctor" ? "Doctor" : "AI"}: ${e.text}`;
    box.append(div);
  }
}

async function init() {
  const status = await call("GET", "/api/status");
  if (!status.ready) {
    $("banner").textContent = status.message;
    $("banner").style.display = "block";
  }
  catalog = await call("GET", "/api/catalog");
  for (const c of catalog.categories) $("category").add(new Option(c.name, c.name));
  for (const s of catalog.severities) $("severity").add(new Option(s, s));
  $("severity").value = "Moderate";
  $("category").addEventListener("change", renderSymptoms);
  renderSymptoms();
  sessionId = (await call("POST", "/api/sessions")).id;
}

window.addEventListener("pagehide", () => {
  if (sessionId) fetch(`/api/sessions/${sessionId}`, { method: "DELETE", keepalive: true });
});

$("form").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  $("error").textContent = "";
  const symptoms = [...$("symptoms").querySelectorAll("input:checked")].map((c) => c.value);
  try {
    const rec = await call("POST", `/api/sessions/${sessionId}/recommendations`, {
      category: $("category").value,
      symptoms,
      severity: $("severity").value,
      history: $("history").value,
      medications: $("medications").value,
    });
    renderSections(rec.sections);
    await refreshLog();
  } catch (e) {
    $("error").textContent = e.message;
  }
});

$("ask").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  $("error").textContent = "";
  try {
    await call("POST", `/api/sessions/${sessionId}/questions`, { question: $("question").value });
    $("question").value = "";
    await refreshLog();
  } catch (e) {
    $("error").textContent = e.message;
  }
});

init().catch((e) => { $("error").textContent = e.message; });
</script>
</body>
</html>
"#;
