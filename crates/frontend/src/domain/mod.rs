pub mod a001_analysis_chat;
