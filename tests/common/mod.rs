pub mod virtual_network;
