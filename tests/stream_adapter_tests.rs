use oai_compat::models::chat::ChatStreamChunk;
use oai_compat::ChatToResponsesStreamAdapter;
use serde_json::{json, Value};

fn chunk(value: Value) -> ChatStreamChunk {
    serde_json::from_value(value).unwrap()
}

/// Feed every chunk and return the decoded events in emission order.
fn run(adapter: &mut ChatToResponsesStreamAdapter, chunks: Vec<Value>) -> Vec<Value> {
    let mut events = Vec::new();
    for c in chunks {
        for payload in adapter.convert_chunk(&chunk(c)) {
            events.push(serde_json::from_slice(&payload).unwrap());
        }
    }
    events
}

fn event_types(events: &[Value]) -> Vec<&str> {
    events.iter().map(|e| e["type"].as_str().unwrap()).collect()
}

fn of_type<'a>(events: &'a [Value], kind: &str) -> Vec<&'a Value> {
    events.iter().filter(|e| e["type"] == kind).collect()
}

#[test]
fn text_only_single_chunk_lifecycle() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![json!({
            "choices": [{"delta": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}]
        })],
    );

    assert_eq!(
        event_types(&events),
        vec![
            "response.created",
            "response.in_progress",
            "response.output_item.added",
            "response.content_part.added",
            "response.output_text.delta",
            "response.output_text.done",
            "response.content_part.done",
            "response.output_item.done",
            "response.completed",
        ]
    );

    assert_eq!(events[0]["response"]["id"], adapter.response_id());
    assert_eq!(events[0]["response"]["status"], "in_progress");
    assert_eq!(events[4]["delta"], "Hi");
    assert_eq!(events[8]["response"]["status"], "completed");
    assert_eq!(events[8]["response"]["output"][0]["type"], "message");
}

#[test]
fn split_text_keeps_item_id_and_content_index_stable() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![
            json!({"choices": [{"delta": {"role": "assistant", "content": "Hel"}}]}),
            json!({"choices": [{"delta": {"content": "lo"}, "finish_reason": "stop"}]}),
        ],
    );

    let deltas = of_type(&events, "response.output_text.delta");
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0]["delta"], "Hel");
    assert_eq!(deltas[1]["delta"], "lo");
    assert_eq!(deltas[0]["item_id"], deltas[1]["item_id"]);
    assert_eq!(deltas[0]["content_index"], deltas[1]["content_index"]);
    // Only one content part was ever opened.
    assert_eq!(of_type(&events, "response.content_part.added").len(), 1);
}

#[test]
fn tool_call_only_stream_reconstructs_arguments() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_a", "function": {"name": "f", "arguments": "{\"x\":"}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "1}"}}
            ]}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}),
        ],
    );

    assert_eq!(
        event_types(&events),
        vec![
            "response.created",
            "response.in_progress",
            "response.output_item.added",
            "response.function_call_arguments.delta",
            "response.function_call_arguments.delta",
            "response.function_call_arguments.done",
            "response.output_item.done",
            "response.completed",
        ]
    );

    let added = &events[2];
    assert_eq!(added["output_index"], 1);
    assert_eq!(added["item"]["type"], "function_call");
    assert_eq!(added["item"]["call_id"], "call_a");
    assert_eq!(added["item"]["name"], "f");
    assert!(added["item"]["id"].as_str().unwrap().starts_with("fc_"));

    // Concatenated deltas equal the terminal argument string.
    let reassembled: String = of_type(&events, "response.function_call_arguments.delta")
        .iter()
        .map(|e| e["delta"].as_str().unwrap())
        .collect();
    assert_eq!(reassembled, "{\"x\":1}");
    assert_eq!(events[5]["arguments"], "{\"x\":1}");
    assert_eq!(events[6]["item"]["arguments"], "{\"x\":1}");
    assert_eq!(events[7]["response"]["output"][0]["arguments"], "{\"x\":1}");
    assert_eq!(events[7]["response"]["output"][0]["call_id"], "call_a");
}

#[test]
fn reasoning_comes_before_text() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![
            json!({"choices": [{"delta": {"role": "assistant", "reasoning_content": "because"}}]}),
            json!({"choices": [{"delta": {"content": "42"}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "stop"}]}),
        ],
    );

    let parts = of_type(&events, "response.content_part.added");
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["part"]["type"], "reasoning");
    assert_eq!(parts[0]["content_index"], 0);
    assert_eq!(parts[1]["part"]["type"], "output_text");
    assert_eq!(parts[1]["content_index"], 1);

    // Close-out order: reasoning before text, then the message item.
    let tail: Vec<&str> = event_types(&events)[7..].to_vec();
    assert_eq!(
        tail,
        vec![
            "response.reasoning.done",
            "response.content_part.done",
            "response.output_text.done",
            "response.content_part.done",
            "response.output_item.done",
            "response.completed",
        ]
    );

    let completed = events.last().unwrap();
    let content = &completed["response"]["output"][0]["content"];
    assert_eq!(content[0]["type"], "reasoning");
    assert_eq!(content[1]["type"], "output_text");
}

#[test]
fn length_finish_marks_response_incomplete() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![json!({"choices": [{"delta": {"content": "ABC"}, "finish_reason": "length"}]})],
    );
    let completed = events.last().unwrap();
    assert_eq!(completed["type"], "response.completed");
    assert_eq!(completed["response"]["status"], "incomplete");
}

#[test]
fn content_filter_finish_marks_response_failed() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![json!({"choices": [{"delta": {"role": "assistant", "content": "no"}, "finish_reason": "content_filter"}]})],
    );
    assert_eq!(events.last().unwrap()["response"]["status"], "failed");
}

#[test]
fn message_and_parallel_tool_calls_share_the_stream() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![
            json!({"model": "gpt-4o", "choices": [{"delta": {"role": "assistant", "content": "I'll check"}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_a", "function": {"name": "f", "arguments": "{"}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 1, "id": "call_b", "function": {"name": "g", "arguments": "{}"}},
                {"index": 0, "function": {"arguments": "}"}}
            ]}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}],
                   "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}}),
        ],
    );

    // The message item holds slot 0; tool calls shift up by one.
    let added = of_type(&events, "response.output_item.added");
    assert_eq!(added.len(), 3);
    assert_eq!(added[0]["item"]["type"], "message");
    assert_eq!(added[0]["output_index"], 0);
    assert_eq!(added[1]["item"]["call_id"], "call_a");
    assert_eq!(added[1]["output_index"], 1);
    assert_eq!(added[2]["item"]["call_id"], "call_b");
    assert_eq!(added[2]["output_index"], 2);

    // Argument deltas carry the shifted index of their call.
    let arg_deltas = of_type(&events, "response.function_call_arguments.delta");
    assert_eq!(arg_deltas[0]["output_index"], 1);
    assert_eq!(arg_deltas[1]["output_index"], 2);
    assert_eq!(arg_deltas[2]["output_index"], 1);

    // Tool calls close in insertion order after the message item.
    let done = of_type(&events, "response.output_item.done");
    assert_eq!(done.len(), 3);
    assert_eq!(done[0]["item"]["type"], "message");
    assert_eq!(done[1]["output_index"], 1);
    assert_eq!(done[1]["item"]["arguments"], "{}");
    assert_eq!(done[2]["output_index"], 2);

    let completed = events.last().unwrap();
    let output = completed["response"]["output"].as_array().unwrap();
    assert_eq!(output.len(), 3);
    assert_eq!(output[0]["type"], "message");
    assert_eq!(output[1]["name"], "f");
    assert_eq!(output[2]["name"], "g");
    assert_eq!(completed["response"]["model"], "gpt-4o");
    assert_eq!(
        completed["response"]["usage"],
        json!({"input_tokens": 10, "output_tokens": 5, "total_tokens": 15})
    );
}

#[test]
fn tool_calls_close_in_arrival_order_not_index_order() {
    // Some relayed backends announce a higher tool index before a lower one.
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 1, "id": "call_b", "function": {"name": "g", "arguments": "{\"b\":1}"}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_a", "function": {"name": "f", "arguments": "{\"a\":1}"}}
            ]}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}),
        ],
    );

    let added = of_type(&events, "response.output_item.added");
    assert_eq!(added[0]["item"]["call_id"], "call_b");
    assert_eq!(added[1]["item"]["call_id"], "call_a");

    // Close-out follows the order the calls were opened, not their indices.
    let args_done: Vec<&str> = of_type(&events, "response.function_call_arguments.done")
        .iter()
        .map(|e| e["arguments"].as_str().unwrap())
        .collect();
    assert_eq!(args_done, vec!["{\"b\":1}", "{\"a\":1}"]);

    let done = of_type(&events, "response.output_item.done");
    assert_eq!(done[0]["item"]["call_id"], "call_b");
    assert_eq!(done[0]["output_index"], 1);
    assert_eq!(done[1]["item"]["call_id"], "call_a");
    assert_eq!(done[1]["output_index"], 0);

    // The terminal snapshot lists the calls in the same arrival order.
    let output = events.last().unwrap()["response"]["output"].as_array().unwrap();
    assert_eq!(output[0]["call_id"], "call_b");
    assert_eq!(output[0]["name"], "g");
    assert_eq!(output[1]["call_id"], "call_a");
    assert_eq!(output[1]["name"], "f");
}

#[test]
fn every_added_event_is_closed_exactly_once() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![
            json!({"choices": [{"delta": {"role": "assistant", "reasoning_content": "r"}}]}),
            json!({"choices": [{"delta": {"content": "t", "tool_calls": [
                {"index": 0, "id": "call_a", "function": {"name": "f", "arguments": "{}"}}
            ]}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "stop"}]}),
        ],
    );

    // Item-level pairing, by item id.
    let added_ids: Vec<&str> = of_type(&events, "response.output_item.added")
        .iter()
        .map(|e| e["item"]["id"].as_str().unwrap())
        .collect();
    let done_ids: Vec<&str> = of_type(&events, "response.output_item.done")
        .iter()
        .map(|e| e["item"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(added_ids.len(), 2);
    for id in &added_ids {
        assert_eq!(done_ids.iter().filter(|d| d == &id).count(), 1);
    }

    // Content-part pairing, by content index.
    let part_added: Vec<i64> = of_type(&events, "response.content_part.added")
        .iter()
        .map(|e| e["content_index"].as_i64().unwrap())
        .collect();
    let part_done: Vec<i64> = of_type(&events, "response.content_part.done")
        .iter()
        .map(|e| e["content_index"].as_i64().unwrap())
        .collect();
    assert_eq!(part_added, vec![0, 1]);
    {
        let mut sorted = part_done.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, part_added);
    }

    // Every item id in the terminal snapshot was announced earlier.
    let completed = events.last().unwrap();
    assert_eq!(completed["type"], "response.completed");
    for item in completed["response"]["output"].as_array().unwrap() {
        let id = item["id"].as_str().unwrap();
        assert!(added_ids.contains(&id), "unannounced item {id}");
    }

    // Nothing follows response.completed.
    assert_eq!(
        of_type(&events, "response.completed").len(),
        1
    );
}

#[test]
fn explicit_usage_counters_win_in_the_completed_event() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![json!({
            "choices": [{"delta": {"role": "assistant", "content": "x"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15,
                      "input_tokens": 7}
        })],
    );
    assert_eq!(
        events.last().unwrap()["response"]["usage"],
        json!({"input_tokens": 7, "output_tokens": 5, "total_tokens": 15})
    );
}

#[test]
fn reasoning_alias_field_feeds_the_reasoning_part() {
    let mut adapter = ChatToResponsesStreamAdapter::new(None);
    let events = run(
        &mut adapter,
        vec![
            json!({"choices": [{"delta": {"role": "assistant", "reasoning": "hmm"}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "stop"}]}),
        ],
    );
    let deltas = of_type(&events, "response.reasoning.delta");
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0]["delta"], "hmm");
}

#[test]
fn identifiers_are_deterministic_with_an_injected_generator() {
    let make = || {
        let mut n = 0u32;
        ChatToResponsesStreamAdapter::with_id_gen(
            None,
            Box::new(move || {
                n += 1;
                format!("{n:032x}")
            }),
        )
    };

    let mut a = make();
    let mut b = make();
    assert_eq!(a.response_id(), b.response_id());

    let chunks = vec![json!({
        "choices": [{"delta": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}]
    })];
    let ea = run(&mut a, chunks.clone());
    let eb = run(&mut b, chunks);
    // Timestamps aside, both streams mint identical identifiers.
    assert_eq!(ea[2]["item"]["id"], eb[2]["item"]["id"]);
    assert_eq!(ea[0]["response"]["id"], eb[0]["response"]["id"]);
}
