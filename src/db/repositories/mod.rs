mod chat_contexts;
mod chat_messages;
mod predictions;
