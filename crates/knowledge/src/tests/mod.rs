mod fakes;
mod rag_pipeline;
