mod encoder_decoder;
mod message;
